//! A fluent query over one table.
//!
//! ```no_run
//! use noco_client::{HttpTransport, RecordsClient};
//! use noco_config::Config;
//!
//! # fn main() -> noco_client::Result<()> {
//! let client = RecordsClient::<HttpTransport>::from_config(&Config::load()?)?;
//! let active = client
//!     .query("m_users")
//!     .where_("Status", "eq", "active")?
//!     .where_in("Role", ["admin", "editor"])?
//!     .order_by_desc("CreatedAt")
//!     .take(50)
//!     .get()?;
//! # Ok(())
//! # }
//! ```

use noco_query::{FilterBuilder, FilterValue, Logic, Operator, SortBuilder};

use crate::{
    error::Result,
    http_client::Transport,
    records::{Record, RecordQuery, RecordsClient, DEFAULT_LIMIT},
};

/// Collects filter, sort, field selection and paging for one table read.
pub struct QueryBuilder<'a, T> {
    client: &'a RecordsClient<T>,
    table_id: String,
    filter: FilterBuilder,
    sort: SortBuilder,
    fields: Vec<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl<T> Clone for QueryBuilder<'_, T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client,
            table_id: self.table_id.clone(),
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            fields: self.fields.clone(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

impl<'a, T: Transport> QueryBuilder<'a, T> {
    /// An unfiltered query over `table_id`.
    pub fn new(client: &'a RecordsClient<T>, table_id: impl Into<String>) -> Self {
        Self {
            client,
            table_id: table_id.into(),
            filter: FilterBuilder::new(),
            sort: SortBuilder::new(),
            fields: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// The table this query reads.
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Adds a condition. The first condition starts the filter; later ones
    /// are joined with `~and`.
    pub fn where_(
        self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<FilterValue>,
    ) -> Result<Self> {
        let operator = operator.parse()?;
        self.push(Logic::And, field, operator, value)
    }

    /// Alias for [`where_`](Self::where_).
    pub fn and_where(
        self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<FilterValue>,
    ) -> Result<Self> {
        self.where_(field, operator, value)
    }

    /// Adds a condition joined with `~or`.
    pub fn or_where(
        self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<FilterValue>,
    ) -> Result<Self> {
        let operator = operator.parse()?;
        self.push(Logic::Or, field, operator, value)
    }

    /// Adds a negated condition. `~not` is kept even on the first condition.
    pub fn not_where(
        mut self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<FilterValue>,
    ) -> Result<Self> {
        let operator = operator.parse()?;
        self.filter.condition(Logic::Not, field, operator, value)?;
        Ok(self)
    }

    /// Matches any of `values`.
    pub fn where_in(self, field: impl Into<String>, values: impl Into<FilterValue>) -> Result<Self> {
        self.push(Logic::And, field, Operator::In, values)
    }

    /// Matches none of `values`.
    pub fn where_not_in(
        self,
        field: impl Into<String>,
        values: impl Into<FilterValue>,
    ) -> Result<Self> {
        self.push(Logic::And, field, Operator::NotIn, values)
    }

    /// Matches `low..=high` with `btw`.
    pub fn where_between(
        self,
        field: impl Into<String>,
        low: impl Into<FilterValue>,
        high: impl Into<FilterValue>,
    ) -> Result<Self> {
        let bounds = FilterValue::List(vec![low.into(), high.into()]);
        self.push(Logic::And, field, Operator::Btw, bounds)
    }

    /// Matches `pattern` with `like`; `%` is the wildcard.
    pub fn where_like(self, field: impl Into<String>, pattern: impl Into<String>) -> Result<Self> {
        self.push(Logic::And, field, Operator::Like, pattern.into())
    }

    /// Matches rows where `field` is null.
    pub fn where_null(self, field: impl Into<String>) -> Result<Self> {
        self.push(Logic::And, field, Operator::Null, FilterValue::Null)
    }

    /// Matches rows where `field` is not null.
    pub fn where_not_null(self, field: impl Into<String>) -> Result<Self> {
        self.push(Logic::And, field, Operator::NotNull, FilterValue::Null)
    }

    /// Adds a parenthesised group built by `build`, joined like [`where_`](Self::where_).
    pub fn where_group<F>(self, build: F) -> Result<Self>
    where
        F: FnOnce(&mut FilterBuilder) -> noco_query::Result<()>,
    {
        self.group(Logic::And, build)
    }

    /// Like [`where_group`](Self::where_group), joined with `~or`.
    pub fn or_where_group<F>(self, build: F) -> Result<Self>
    where
        F: FnOnce(&mut FilterBuilder) -> noco_query::Result<()>,
    {
        self.group(Logic::Or, build)
    }

    /// Replaces the selected fields. An empty list selects every field.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Appends one field to the selection.
    pub fn add_select(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Adds a sort field with a textual direction (`asc`/`desc`, any case).
    pub fn order_by(mut self, field: impl Into<String>, direction: &str) -> Result<Self> {
        self.sort.add(field, direction)?;
        Ok(self)
    }

    /// Sorts ascending by `field`.
    pub fn order_by_asc(mut self, field: impl Into<String>) -> Self {
        self.sort.asc(field);
        self
    }

    /// Sorts descending by `field`.
    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.sort.desc(field);
        self
    }

    /// Caps the number of rows read across all pages.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Alias for [`limit`](Self::limit).
    pub fn take(self, count: usize) -> Self {
        self.limit(count)
    }

    /// Skips the first `offset` matching rows.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Alias for [`offset`](Self::offset).
    pub fn skip(self, count: usize) -> Self {
        self.offset(count)
    }

    /// Selects page `page` (1-based) of `per_page` rows. Page 0 reads as page 1.
    pub fn page(mut self, page: usize, per_page: usize) -> Self {
        self.limit = Some(per_page);
        self.offset = Some(page.saturating_sub(1).saturating_mul(per_page));
        self
    }

    /// The read this builder describes.
    pub fn to_query(&self) -> Result<RecordQuery> {
        let filter = self.filter.build()?;
        let sort = self.sort.build();

        Ok(RecordQuery {
            sort: (!sort.is_empty()).then_some(sort),
            where_: (!filter.is_empty()).then_some(filter),
            fields: self.fields.clone(),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT),
            offset: self.offset.unwrap_or(0),
        })
    }

    /// Query parameters of the first page request.
    pub fn to_params(&self) -> Result<Vec<(String, String)>> {
        let query = self.to_query()?;
        let first_page = query.limit.min(self.client.max_page_size());
        Ok(query.page_params(query.offset, first_page))
    }

    /// Reads every matching record, paging as needed.
    pub fn get(self) -> Result<Vec<Record>> {
        let query = self.to_query()?;
        self.client.get_records(&self.table_id, &query)
    }

    /// Reads at most one record.
    pub fn first(self) -> Result<Option<Record>> {
        Ok(self.limit(1).get()?.into_iter().next())
    }

    /// Counts matching records. Paging, sort and field selection are ignored.
    pub fn count(&self) -> Result<u64> {
        let filter = self.filter.build()?;
        let where_ = (!filter.is_empty()).then_some(filter.as_str());
        self.client.count_records(&self.table_id, where_)
    }

    /// Whether any record matches the filter.
    pub fn exists(&self) -> Result<bool> {
        Ok(self.count()? > 0)
    }

    fn push(
        mut self,
        logic: Logic,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Result<Self> {
        let logic = if self.filter.is_empty() {
            Logic::None
        } else {
            logic
        };
        self.filter.condition(logic, field, operator, value)?;
        Ok(self)
    }

    fn group<F>(mut self, logic: Logic, build: F) -> Result<Self>
    where
        F: FnOnce(&mut FilterBuilder) -> noco_query::Result<()>,
    {
        match (self.filter.is_empty(), logic) {
            (true, _) => self.filter.group_start()?,
            (false, Logic::Or) => self.filter.or_group(),
            (false, _) => self.filter.and_group(),
        };
        build(&mut self.filter)?;
        self.filter.group_end()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{error::ClientError, test_utils::MockTransport};

    fn list_transport() -> MockTransport {
        MockTransport::replying(json!({
            "list": [{ "Id": 1 }, { "Id": 2 }],
            "pageInfo": { "isLastPage": true }
        }))
    }

    fn param(params: &[(String, String)], key: &str) -> Option<String> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    #[test]
    fn test_where_chain_joins_with_and() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let params = client
            .query("users")
            .where_("Name", "eq", "John")
            .unwrap()
            .where_("Age", "gt", 18)
            .unwrap()
            .or_where("Role", "eq", "admin")
            .unwrap()
            .to_params()
            .unwrap();

        assert_eq!(
            param(&params, "where").as_deref(),
            Some("(Name,eq,John)~and(Age,gt,18)~or(Role,eq,admin)")
        );
    }

    #[test]
    fn test_first_or_where_has_no_prefix() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let query = client
            .query("users")
            .or_where("Name", "eq", "John")
            .unwrap()
            .to_query()
            .unwrap();
        assert_eq!(query.where_.as_deref(), Some("(Name,eq,John)"));
    }

    #[test]
    fn test_not_where() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let query = client
            .query("users")
            .not_where("Status", "eq", "deleted")
            .unwrap()
            .to_query()
            .unwrap();
        assert_eq!(query.where_.as_deref(), Some("~not(Status,eq,deleted)"));
    }

    #[test]
    fn test_special_conditions() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let query = client
            .query("products")
            .where_in("Category", ["electronics", "books"])
            .unwrap()
            .where_not_in("Status", vec!["deleted", "archived"])
            .unwrap()
            .where_between("Price", 10, 100)
            .unwrap()
            .where_like("Name", "%phone%")
            .unwrap()
            .where_null("DeletedAt")
            .unwrap()
            .where_not_null("Sku")
            .unwrap()
            .to_query()
            .unwrap();

        assert_eq!(
            query.where_.as_deref(),
            Some(
                "(Category,in,electronics,books)~and(Status,notin,deleted,archived)\
                 ~and(Price,btw,10,100)~and(Name,like,%phone%)~and(DeletedAt,null)\
                 ~and(Sku,notnull)"
            )
        );
    }

    #[test]
    fn test_where_group() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let query = client
            .query("users")
            .where_("Active", "checked", ())
            .unwrap()
            .where_group(|g| {
                g.where_("Role", "eq", "admin")?.or("Role", "eq", "owner")?;
                Ok(())
            })
            .unwrap()
            .to_query()
            .unwrap();

        assert_eq!(
            query.where_.as_deref(),
            Some("(Active,checked)~and((Role,eq,admin)~or(Role,eq,owner))")
        );
    }

    #[test]
    fn test_unsupported_operator() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let result = client.query("users").where_("Name", "equals", "x");
        assert!(matches!(
            result,
            Err(ClientError::Query(noco_query::QueryError::UnsupportedOperator(_)))
        ));
    }

    #[test]
    fn test_between_with_one_bound_fails() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let result = client.query("users").where_("Age", "btw", 5);
        assert!(matches!(
            result,
            Err(ClientError::Query(noco_query::QueryError::InvalidValue {
                operator: "btw",
                ..
            }))
        ));

        let result = client.query("users").where_in("Role", Vec::<&str>::new());
        assert!(matches!(
            result,
            Err(ClientError::Query(noco_query::QueryError::InvalidValue { .. }))
        ));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_group_as_first_condition() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let query = client
            .query("users")
            .or_where_group(|g| {
                g.where_("Role", "eq", "admin")?.or("Role", "eq", "owner")?;
                Ok(())
            })
            .unwrap()
            .where_("Active", "checked", ())
            .unwrap()
            .to_query()
            .unwrap();

        assert_eq!(
            query.where_.as_deref(),
            Some("((Role,eq,admin)~or(Role,eq,owner))~and(Active,checked)")
        );
    }

    #[test]
    fn test_select_and_order() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let query = client
            .query("users")
            .select(["Id", "Name"])
            .add_select("Email")
            .order_by("Category", "ASC")
            .unwrap()
            .order_by_desc("Price")
            .order_by_asc("Name")
            .to_query()
            .unwrap();

        assert_eq!(query.fields, vec!["Id", "Name", "Email"]);
        assert_eq!(query.sort.as_deref(), Some("Category,-Price,Name"));
        assert!(query.where_.is_none());

        let result = client.query("users").order_by("Name", "sideways");
        assert!(matches!(
            result,
            Err(ClientError::Query(
                noco_query::QueryError::InvalidSortDirection(_)
            ))
        ));
    }

    #[test]
    fn test_limit_offset_and_page() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let query = client.query("users").to_query().unwrap();
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.offset, 0);

        let query = client.query("users").take(15).skip(30).to_query().unwrap();
        assert_eq!((query.limit, query.offset), (15, 30));

        let query = client.query("users").page(3, 20).to_query().unwrap();
        assert_eq!((query.limit, query.offset), (20, 40));

        let query = client.query("users").page(0, 20).to_query().unwrap();
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_to_params_caps_first_page() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let params = client
            .query("users")
            .limit(250)
            .offset(10)
            .to_params()
            .unwrap();
        assert_eq!(param(&params, "limit").as_deref(), Some("100"));
        assert_eq!(param(&params, "offset").as_deref(), Some("10"));
    }

    #[test]
    fn test_get_sends_query() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let records = client
            .query("users")
            .where_("Status", "eq", "active")
            .unwrap()
            .order_by_desc("CreatedAt")
            .select(["Id"])
            .get()
            .unwrap();
        assert_eq!(records.len(), 2);

        let request = &transport.requests()[0];
        assert_eq!(request.path, "api/v2/tables/users/records");
        assert_eq!(request.query_param("where"), Some("(Status,eq,active)"));
        assert_eq!(request.query_param("sort"), Some("-CreatedAt"));
        assert_eq!(request.query_param("fields"), Some("Id"));
        assert_eq!(request.query_param("limit"), Some("25"));
    }

    #[test]
    fn test_first() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let record = client.query("users").first().unwrap().unwrap();
        assert_eq!(record["Id"], json!(1));
        assert_eq!(transport.requests()[0].query_param("limit"), Some("1"));

        let empty = MockTransport::replying(json!({ "list": [], "pageInfo": { "isLastPage": true } }));
        let client = RecordsClient::new(&empty);
        assert!(client.query("users").first().unwrap().is_none());
    }

    #[test]
    fn test_count_and_exists() {
        let transport = MockTransport::replying(json!({ "count": 150 }));
        let client = RecordsClient::new(&transport);

        let query = client
            .query("users")
            .where_("Status", "eq", "active")
            .unwrap()
            .limit(5);
        assert_eq!(query.count().unwrap(), 150);
        assert!(query.exists().unwrap());

        let request = &transport.requests()[0];
        assert_eq!(request.path, "api/v2/tables/users/records/count");
        assert_eq!(request.query_param("where"), Some("(Status,eq,active)"));
        assert_eq!(request.query_param("limit"), None);

        let transport = MockTransport::replying(json!({ "count": 0 }));
        let client = RecordsClient::new(&transport);
        assert!(!client.query("users").exists().unwrap());
    }

    #[test]
    fn test_clone_is_independent() {
        let transport = list_transport();
        let client = RecordsClient::new(&transport);

        let base = client.query("users").where_("A", "eq", 1).unwrap();
        let extended = base.clone().where_("B", "eq", 2).unwrap();

        assert_eq!(
            base.to_query().unwrap().where_.as_deref(),
            Some("(A,eq,1)")
        );
        assert_eq!(
            extended.to_query().unwrap().where_.as_deref(),
            Some("(A,eq,1)~and(B,eq,2)")
        );
    }
}
