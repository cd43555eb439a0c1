use std::cell::RefCell;

use serde_json::Value;

use crate::{
    error::Result,
    http_client::{ApiRequest, Transport},
};

type Responder = Box<dyn Fn(&ApiRequest) -> Result<Value>>;

/// A [`Transport`] that records every request and answers from a closure.
pub struct MockTransport {
    requests: RefCell<Vec<ApiRequest>>,
    responder: Responder,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<Value> + 'static,
    {
        Self {
            requests: RefCell::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Answers every request with `value`.
    pub fn replying(value: Value) -> Self {
        Self::new(move |_| Ok(value.clone()))
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for MockTransport {
    fn request(&self, request: ApiRequest) -> Result<Value> {
        let response = (self.responder)(&request);
        self.requests.borrow_mut().push(request);
        response
    }
}

/// Echoes back `{"Id": ...}` for every element of an array body.
pub fn echo_ids(request: &ApiRequest) -> Result<Value> {
    let ids = match &request.body {
        Some(Value::Array(items)) => {
            items
                .iter()
                .map(|item| serde_json::json!({ "Id": item.get("Id").cloned().unwrap_or(Value::Null) }))
                .collect()
        }
        _ => Vec::new(),
    };
    Ok(Value::Array(ids))
}
