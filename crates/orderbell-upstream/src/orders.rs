use async_trait::async_trait;
use tracing::debug;

use orderbell_types::models::{GetOrdersBody, Order, count_new_orders};

use crate::auth::BearerToken;
use crate::client::{AUTHORIZATION_CODE_HEADER, ORDERS_PATH, UpstreamClient, header_value};
use crate::error::UpstreamError;

#[async_trait]
pub trait OrderFeed: Send + Sync {
    /// Number of orders currently in the new state.
    ///
    /// Takes a [`BearerToken`], so it can only run after a successful login.
    async fn fetch_new_orders(&self, token: &BearerToken) -> Result<usize, UpstreamError>;
}

impl UpstreamClient {
    /// Full order list for the account the token belongs to.
    pub async fn get_orders(&self, token: &BearerToken) -> Result<Vec<Order>, UpstreamError> {
        let mut headers = self.base_headers()?;
        headers.insert(AUTHORIZATION_CODE_HEADER, header_value(token.as_str())?);

        let body = GetOrdersBody {
            authorization_code: token.as_str(),
            security_key: self.security_key(),
        };
        self.post_json(ORDERS_PATH, headers, &body).await
    }
}

#[async_trait]
impl OrderFeed for UpstreamClient {
    async fn fetch_new_orders(&self, token: &BearerToken) -> Result<usize, UpstreamError> {
        let orders = self.get_orders(token).await?;
        let count = count_new_orders(&orders);
        debug!(total = orders.len(), new = count, "fetched orders");
        Ok(count)
    }
}
