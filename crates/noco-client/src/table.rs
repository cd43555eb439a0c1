use crate::{
    error::Result,
    http_client::Transport,
    query::QueryBuilder,
    records::{Record, RecordId, RecordQuery, RecordsClient},
};

/// A [`RecordsClient`] bound to one table.
pub struct Table<'a, T> {
    client: &'a RecordsClient<T>,
    table_id: String,
}

impl<'a, T: Transport> Table<'a, T> {
    /// Binds `client` to `table_id`.
    pub fn new(client: &'a RecordsClient<T>, table_id: impl Into<String>) -> Self {
        Self {
            client,
            table_id: table_id.into(),
        }
    }

    /// The bound table.
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// The underlying client.
    pub fn client(&self) -> &'a RecordsClient<T> {
        self.client
    }

    /// Starts a [`QueryBuilder`] over this table.
    pub fn query(&self) -> QueryBuilder<'a, T> {
        QueryBuilder::new(self.client, self.table_id.as_str())
    }

    /// See [`RecordsClient::get_records`].
    pub fn get_records(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        self.client.get_records(&self.table_id, query)
    }

    /// See [`RecordsClient::get_record`].
    pub fn get_record(&self, id: impl Into<RecordId>, fields: &[&str]) -> Result<Record> {
        self.client.get_record(&self.table_id, id, fields)
    }

    /// See [`RecordsClient::insert_record`].
    pub fn insert_record(&self, record: &Record) -> Result<RecordId> {
        self.client.insert_record(&self.table_id, record)
    }

    /// See [`RecordsClient::update_record`].
    pub fn update_record(&self, record: Record, id: Option<RecordId>) -> Result<RecordId> {
        self.client.update_record(&self.table_id, record, id)
    }

    /// See [`RecordsClient::delete_record`].
    pub fn delete_record(&self, id: impl Into<RecordId>) -> Result<RecordId> {
        self.client.delete_record(&self.table_id, id)
    }

    /// See [`RecordsClient::count_records`].
    pub fn count_records(&self, where_: Option<&str>) -> Result<u64> {
        self.client.count_records(&self.table_id, where_)
    }

    /// See [`RecordsClient::bulk_insert_records`].
    pub fn bulk_insert_records(&self, records: &[Record]) -> Result<Vec<RecordId>> {
        self.client.bulk_insert_records(&self.table_id, records)
    }

    /// See [`RecordsClient::bulk_update_records`].
    pub fn bulk_update_records(&self, records: &[Record]) -> Result<Vec<RecordId>> {
        self.client.bulk_update_records(&self.table_id, records)
    }

    /// See [`RecordsClient::bulk_delete_records`].
    pub fn bulk_delete_records(&self, ids: &[RecordId]) -> Result<Vec<RecordId>> {
        self.client.bulk_delete_records(&self.table_id, ids)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{http_client::Method, test_utils::MockTransport};

    #[test]
    fn test_table_forwards_table_id() {
        let transport = MockTransport::replying(json!({ "Id": 1, "count": 4 }));
        let client = RecordsClient::new(&transport);
        let table = client.table("m_users");
        assert_eq!(table.table_id(), "m_users");

        table.get_record(1, &[]).unwrap();
        table.delete_record(1).unwrap();
        assert_eq!(table.count_records(None).unwrap(), 4);

        let paths: Vec<_> = transport.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec![
                "api/v2/tables/m_users/records/1",
                "api/v2/tables/m_users/records",
                "api/v2/tables/m_users/records/count",
            ]
        );
    }

    #[test]
    fn test_table_get_records() {
        let transport = MockTransport::replying(json!({
            "list": [{ "Id": 1 }],
            "pageInfo": { "isLastPage": true }
        }));
        let client = RecordsClient::new(&transport);

        let records = client
            .table("m_users")
            .get_records(&RecordQuery::new().sort("-Id"))
            .unwrap();
        assert_eq!(records.len(), 1);

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.query_param("sort"), Some("-Id"));
    }
}
