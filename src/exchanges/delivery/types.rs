use crate::core::kernel::HttpParameter;
use serde::{Deserialize, Serialize};

/// Parameters for `POST dapi/v1/order`
///
/// Unset optional fields are left out of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub position_side: Option<String>,
    pub quantity: Option<String>,
    pub reduce_only: Option<bool>,
    pub price: Option<String>,
    pub new_client_order_id: Option<String>,
    pub stop_price: Option<String>,
    pub close_position: Option<bool>,
    pub activation_price: Option<String>,
    pub callback_rate: Option<String>,
    pub working_type: Option<String>,
    pub price_protect: Option<bool>,
    pub new_order_resp_type: Option<String>,
    pub time_in_force: Option<String>,
}

impl NewOrder {
    pub fn limit(
        symbol: impl Into<String>,
        side: impl Into<String>,
        quantity: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side: side.into(),
            order_type: "LIMIT".to_string(),
            quantity: Some(quantity.into()),
            price: Some(price.into()),
            time_in_force: Some("GTC".to_string()),
            ..Self::default()
        }
    }

    pub fn market(
        symbol: impl Into<String>,
        side: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side: side.into(),
            order_type: "MARKET".to_string(),
            quantity: Some(quantity.into()),
            ..Self::default()
        }
    }

    /// Trailing stop that activates at `activation_price` and trails by `callback_rate` percent
    pub fn trailing_stop(
        symbol: impl Into<String>,
        side: impl Into<String>,
        quantity: impl Into<String>,
        activation_price: impl Into<String>,
        callback_rate: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side: side.into(),
            order_type: "TRAILING_STOP_MARKET".to_string(),
            quantity: Some(quantity.into()),
            activation_price: Some(activation_price.into()),
            callback_rate: Some(callback_rate.into()),
            ..Self::default()
        }
    }

    pub(super) fn to_params(&self) -> Vec<HttpParameter> {
        let mut params = vec![
            HttpParameter::replace("symbol", &self.symbol),
            HttpParameter::replace("side", &self.side),
            HttpParameter::replace("type", &self.order_type),
        ];
        let optional = [
            ("positionSide", self.position_side.clone()),
            ("quantity", self.quantity.clone()),
            ("reduceOnly", self.reduce_only.map(|v| v.to_string())),
            ("price", self.price.clone()),
            ("newClientOrderId", self.new_client_order_id.clone()),
            ("stopPrice", self.stop_price.clone()),
            ("closePosition", self.close_position.map(|v| v.to_string())),
            ("activationPrice", self.activation_price.clone()),
            ("callbackRate", self.callback_rate.clone()),
            ("workingType", self.working_type.clone()),
            ("priceProtect", self.price_protect.map(|v| v.to_string())),
            ("newOrderRespType", self.new_order_resp_type.clone()),
            ("timeInForce", self.time_in_force.clone()),
        ];
        params.extend(optional_params(optional));
        params
    }
}

/// An existing order, by venue id or by the client id it was placed with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderRef {
    Id(i64),
    ClientId(String),
}

impl OrderRef {
    pub(super) fn to_param(&self) -> HttpParameter {
        match self {
            Self::Id(id) => HttpParameter::replace("orderId", id.to_string()),
            Self::ClientId(id) => HttpParameter::replace("origClientOrderId", id),
        }
    }
}

/// Optional filters shared by the history and listing queries
///
/// Each query sends only the fields that are set; which fields an endpoint
/// honours is up to the venue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub symbol: Option<String>,
    pub pair: Option<String>,
    pub order_id: Option<i64>,
    pub orig_client_order_id: Option<String>,
    pub from_id: Option<i64>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn pair(mut self, pair: impl Into<String>) -> Self {
        self.pair = Some(pair.into());
        self
    }

    pub fn order(mut self, order: OrderRef) -> Self {
        match order {
            OrderRef::Id(id) => self.order_id = Some(id),
            OrderRef::ClientId(id) => self.orig_client_order_id = Some(id),
        }
        self
    }

    pub fn from_id(mut self, from_id: i64) -> Self {
        self.from_id = Some(from_id);
        self
    }

    /// Millisecond bounds, either of which may be omitted
    pub fn time_range(mut self, start_time: Option<i64>, end_time: Option<i64>) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(super) fn to_params(&self) -> Vec<HttpParameter> {
        optional_params([
            ("symbol", self.symbol.clone()),
            ("pair", self.pair.clone()),
            ("orderId", self.order_id.map(|v| v.to_string())),
            ("origClientOrderId", self.orig_client_order_id.clone()),
            ("fromId", self.from_id.map(|v| v.to_string())),
            ("startTime", self.start_time.map(|v| v.to_string())),
            ("endTime", self.end_time.map(|v| v.to_string())),
            ("limit", self.limit.map(|v| v.to_string())),
        ])
        .collect()
    }
}

pub(super) fn optional_params<I>(pairs: I) -> impl Iterator<Item = HttpParameter>
where
    I: IntoIterator<Item = (&'static str, Option<String>)>,
{
    pairs
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| HttpParameter::replace(key, v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(params: &[HttpParameter]) -> Vec<&str> {
        params.iter().map(|p| p.key.as_str()).collect()
    }

    #[test]
    fn test_limit_order_params() {
        let order = NewOrder::limit("BTCUSD_PERP", "BUY", "1", "25000");
        assert_eq!(
            keys(&order.to_params()),
            ["symbol", "side", "type", "quantity", "price", "timeInForce"]
        );
    }

    #[test]
    fn test_market_order_skips_unset_fields() {
        let mut order = NewOrder::market("BTCUSD_PERP", "SELL", "2");
        order.reduce_only = Some(true);
        let params = order.to_params();
        assert_eq!(keys(&params), ["symbol", "side", "type", "quantity", "reduceOnly"]);
        assert_eq!(params[4].value, "true");
    }

    #[test]
    fn test_conditional_order_fields() {
        let order = NewOrder {
            stop_price: Some("9000".into()),
            close_position: Some(true),
            working_type: Some("MARK_PRICE".into()),
            price_protect: Some(false),
            new_order_resp_type: Some("RESULT".into()),
            position_side: Some("LONG".into()),
            ..NewOrder::market("BTCUSD_PERP", "SELL", "1")
        };
        let params = order.to_params();
        assert_eq!(
            keys(&params),
            [
                "symbol",
                "side",
                "type",
                "positionSide",
                "quantity",
                "stopPrice",
                "closePosition",
                "workingType",
                "priceProtect",
                "newOrderRespType",
            ]
        );
        assert_eq!(params[8].value, "false");
    }

    #[test]
    fn test_trailing_stop_params() {
        let order = NewOrder::trailing_stop("BTCUSD_PERP", "SELL", "1", "10000", "1.5");
        let params = order.to_params();
        assert_eq!(params[2].value, "TRAILING_STOP_MARKET");
        assert!(params
            .iter()
            .any(|p| p.key == "callbackRate" && p.value == "1.5"));
        assert!(params
            .iter()
            .any(|p| p.key == "activationPrice" && p.value == "10000"));
    }

    #[test]
    fn test_order_ref_param() {
        assert_eq!(OrderRef::Id(42).to_param().key, "orderId");
        let client = OrderRef::ClientId("my-order".into()).to_param();
        assert_eq!(client.key, "origClientOrderId");
        assert_eq!(client.value, "my-order");
    }

    #[test]
    fn test_query_filter_sends_only_set_fields() {
        assert!(QueryFilter::new().to_params().is_empty());

        let filter = QueryFilter::new()
            .pair("BTCUSD")
            .order(OrderRef::Id(7))
            .time_range(Some(1), None)
            .limit(50);
        let params = filter.to_params();
        assert_eq!(keys(&params), ["pair", "orderId", "startTime", "limit"]);
        assert_eq!(params[3].value, "50");
    }
}
