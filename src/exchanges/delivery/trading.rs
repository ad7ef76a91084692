use crate::core::errors::ExchangeError;
use crate::core::kernel::{HttpParameter, HttpTransport};
use crate::exchanges::delivery::client::DeliveryClient;
use crate::exchanges::delivery::endpoints::{
    ENTRY_POINT_ALL_OPEN_ORDERS, ENTRY_POINT_ORDER, ENTRY_POINT_POSITION_MODE,
};
use crate::exchanges::delivery::types::{NewOrder, OrderRef};
use serde_json::Value;
use tracing::instrument;

impl<T: HttpTransport> DeliveryClient<T> {
    /// `GET dapi/v1/positionSide/dual`
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn position_mode(&self) -> Result<Value, ExchangeError> {
        let request = self.signed("GET", ENTRY_POINT_POSITION_MODE, Vec::new())?;
        self.send(request).await
    }

    /// `POST dapi/v1/positionSide/dual`; `true` switches to hedge mode
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn change_position_mode(&self, dual_side: bool) -> Result<Value, ExchangeError> {
        let params = vec![HttpParameter::replace(
            "dualSidePosition",
            dual_side.to_string(),
        )];
        let request = self.signed("POST", ENTRY_POINT_POSITION_MODE, params)?;
        self.send(request).await
    }

    /// `POST dapi/v1/order`
    #[instrument(skip(self, order), fields(exchange = "delivery", symbol = %order.symbol))]
    pub async fn new_order(&self, order: &NewOrder) -> Result<Value, ExchangeError> {
        let request = self.signed("POST", ENTRY_POINT_ORDER, order.to_params())?;
        self.send(request).await
    }

    /// `DELETE dapi/v1/order`
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn cancel_order(&self, symbol: &str, order: &OrderRef) -> Result<Value, ExchangeError> {
        let params = vec![HttpParameter::replace("symbol", symbol), order.to_param()];
        let request = self.signed("DELETE", ENTRY_POINT_ORDER, params)?;
        self.send(request).await
    }

    /// `DELETE dapi/v1/allOpenOrders`
    #[instrument(skip(self), fields(exchange = "delivery"))]
    pub async fn cancel_all_open_orders(&self, symbol: &str) -> Result<Value, ExchangeError> {
        let params = vec![HttpParameter::replace("symbol", symbol)];
        let request = self.signed("DELETE", ENTRY_POINT_ALL_OPEN_ORDERS, params)?;
        self.send(request).await
    }
}
