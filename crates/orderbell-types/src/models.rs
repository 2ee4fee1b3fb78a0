use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Order status the upstream uses for new, unfulfilled orders.
pub const NEW_ORDER_STATUS: i64 = 0;

/// A user's login for the order-management API. Held in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST Authorization/Authenticate`.
#[derive(Debug, Serialize)]
pub struct AuthenticateBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response of `POST Authorization/Authenticate`. Other fields are ignored.
#[derive(Debug, Deserialize)]
pub struct AuthenticateReply {
    #[serde(rename = "Token")]
    pub token: Option<String>,
}

/// Body of `POST Orders/GetOrders`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOrdersBody<'a> {
    pub authorization_code: &'a str,
    pub security_key: &'a str,
}

/// One entry of the `Orders/GetOrders` array. Only `Status` is interpreted.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    #[serde(rename = "Status")]
    pub status: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Order {
    pub fn is_new(&self) -> bool {
        self.status == NEW_ORDER_STATUS
    }
}

/// Number of orders in the new state.
pub fn count_new_orders(orders: &[Order]) -> usize {
    orders.iter().filter(|o| o.is_new()).count()
}
