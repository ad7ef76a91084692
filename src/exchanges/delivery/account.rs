use crate::core::errors::ExchangeError;
use crate::core::kernel::{HttpParameter, HttpTransport};
use crate::exchanges::delivery::client::DeliveryClient;
use crate::exchanges::delivery::endpoints::{
    rest_endpoint, ENTRY_POINT_ACCOUNT, ENTRY_POINT_ALL_ORDERS, ENTRY_POINT_BALANCE,
    ENTRY_POINT_INCOME, ENTRY_POINT_LEVERAGE_BRACKET, ENTRY_POINT_LEVERAGE_BRACKET_V2,
    ENTRY_POINT_OPEN_ORDER, ENTRY_POINT_OPEN_ORDERS, ENTRY_POINT_ORDER,
    ENTRY_POINT_ORDER_AMENDMENT, ENTRY_POINT_POSITION_MARGIN, ENTRY_POINT_POSITION_RISK,
    ENTRY_POINT_USER_TRADES, HISTORY,
};
use crate::exchanges::delivery::types::{optional_params, OrderRef, QueryFilter};
use serde_json::Value;
use tracing::instrument;

impl<T: HttpTransport> DeliveryClient<T> {
    /// `GET dapi/v1/order`
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn query_order(&self, symbol: &str, order: &OrderRef) -> Result<Value, ExchangeError> {
        let params = vec![HttpParameter::replace("symbol", symbol), order.to_param()];
        self.signed_get(ENTRY_POINT_ORDER, params).await
    }

    /// `GET dapi/v1/openOrder`
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn query_open_order(
        &self,
        symbol: &str,
        order: &OrderRef,
    ) -> Result<Value, ExchangeError> {
        let params = vec![HttpParameter::replace("symbol", symbol), order.to_param()];
        self.signed_get(ENTRY_POINT_OPEN_ORDER, params).await
    }

    /// `GET dapi/v1/openOrders`; filter by `symbol` or `pair`
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn open_orders(&self, filter: &QueryFilter) -> Result<Value, ExchangeError> {
        self.signed_get(ENTRY_POINT_OPEN_ORDERS, filter.to_params()).await
    }

    /// `GET dapi/v1/allOrders`: active, canceled and filled orders
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn all_orders(&self, filter: &QueryFilter) -> Result<Value, ExchangeError> {
        self.signed_get(ENTRY_POINT_ALL_ORDERS, filter.to_params()).await
    }

    /// `GET dapi/v1/orderAmendment`
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn order_modify_history(&self, filter: &QueryFilter) -> Result<Value, ExchangeError> {
        self.signed_get(ENTRY_POINT_ORDER_AMENDMENT, filter.to_params())
            .await
    }

    /// `GET dapi/v1/balance`
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn account_balance(&self) -> Result<Value, ExchangeError> {
        self.signed_get(ENTRY_POINT_BALANCE, Vec::new()).await
    }

    /// `GET dapi/v1/account`
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn account_information(&self) -> Result<Value, ExchangeError> {
        self.signed_get(ENTRY_POINT_ACCOUNT, Vec::new()).await
    }

    /// `GET dapi/v1/positionRisk`
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn position_information(
        &self,
        margin_asset: Option<&str>,
        pair: Option<&str>,
    ) -> Result<Value, ExchangeError> {
        let params = optional_params([
            ("marginAsset", margin_asset.map(str::to_string)),
            ("pair", pair.map(str::to_string)),
        ])
        .collect();
        self.signed_get(ENTRY_POINT_POSITION_RISK, params).await
    }

    /// `GET dapi/v1/positionMargin/history`
    ///
    /// `change_type` is 1 for added margin and 2 for reduced margin.
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn position_margin_history(
        &self,
        symbol: &str,
        change_type: Option<u8>,
        filter: &QueryFilter,
    ) -> Result<Value, ExchangeError> {
        let mut params = filter.to_params();
        params.push(HttpParameter::replace("symbol", symbol));
        params.extend(optional_params([(
            "type",
            change_type.map(|t| t.to_string()),
        )]));
        let entry_point = rest_endpoint(ENTRY_POINT_POSITION_MARGIN, HISTORY);
        self.signed_get(&entry_point, params).await
    }

    /// `GET dapi/v1/userTrades`
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn account_trades(&self, filter: &QueryFilter) -> Result<Value, ExchangeError> {
        self.signed_get(ENTRY_POINT_USER_TRADES, filter.to_params()).await
    }

    /// `GET dapi/v1/income`, e.g. `income_type` of `FUNDING_FEE`
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn income_history(
        &self,
        income_type: Option<&str>,
        filter: &QueryFilter,
    ) -> Result<Value, ExchangeError> {
        let mut params = filter.to_params();
        params.extend(optional_params([(
            "incomeType",
            income_type.map(str::to_string),
        )]));
        self.signed_get(ENTRY_POINT_INCOME, params).await
    }

    /// `GET dapi/v1/leverageBracket`: notional brackets per pair
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn notional_brackets_by_pair(&self, pair: Option<&str>) -> Result<Value, ExchangeError> {
        let params = optional_params([("pair", pair.map(str::to_string))]).collect();
        self.signed_get(ENTRY_POINT_LEVERAGE_BRACKET, params).await
    }

    /// `GET dapi/v2/leverageBracket`: notional brackets per symbol
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn notional_brackets_by_symbol(
        &self,
        symbol: Option<&str>,
    ) -> Result<Value, ExchangeError> {
        let params = optional_params([("symbol", symbol.map(str::to_string))]).collect();
        self.signed_get(ENTRY_POINT_LEVERAGE_BRACKET_V2, params).await
    }

    async fn signed_get(
        &self,
        entry_point: &str,
        params: Vec<HttpParameter>,
    ) -> Result<Value, ExchangeError> {
        let request = self.signed("GET", entry_point, params)?;
        self.send(request).await
    }
}
