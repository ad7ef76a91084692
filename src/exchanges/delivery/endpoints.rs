//! Coin-margined delivery futures entry points.
//!
//! REST entry points are paths relative to the REST host; join them with
//! [`rest_endpoint`]. Hosts carry no scheme, which the client adds.

pub const REST_HOST: &str = "dapi.binance.com";
pub const TESTNET_REST_HOST: &str = "testnet.binancefuture.com";
pub const STREAM_HOST: &str = "dstream.binance.com/ws";
pub const TESTNET_STREAM_HOST: &str = "dstream.binancefuture.com/ws";

// Market data (public)
pub const ENTRY_POINT_DEPTH: &str = "dapi/v1/depth";

// Trade
pub const ENTRY_POINT_POSITION_MODE: &str = "dapi/v1/positionSide/dual";
pub const ENTRY_POINT_ORDER: &str = "dapi/v1/order";
pub const ENTRY_POINT_ALL_OPEN_ORDERS: &str = "dapi/v1/allOpenOrders";
pub const ENTRY_POINT_POSITION_MARGIN: &str = "dapi/v1/positionMargin";
pub const ENTRY_POINT_ORDER_AMENDMENT: &str = "dapi/v1/orderAmendment";

// User data
pub const ENTRY_POINT_OPEN_ORDER: &str = "dapi/v1/openOrder";
pub const ENTRY_POINT_OPEN_ORDERS: &str = "dapi/v1/openOrders";
pub const ENTRY_POINT_ALL_ORDERS: &str = "dapi/v1/allOrders";
pub const ENTRY_POINT_BALANCE: &str = "dapi/v1/balance";
pub const ENTRY_POINT_POSITION_RISK: &str = "dapi/v1/positionRisk";
pub const ENTRY_POINT_ACCOUNT: &str = "dapi/v1/account";
pub const ENTRY_POINT_USER_TRADES: &str = "dapi/v1/userTrades";
pub const ENTRY_POINT_INCOME: &str = "dapi/v1/income";
pub const ENTRY_POINT_LEVERAGE_BRACKET: &str = "dapi/v1/leverageBracket";
pub const ENTRY_POINT_LEVERAGE_BRACKET_V2: &str = "dapi/v2/leverageBracket";

/// Suffix for history variants, e.g. `dapi/v1/positionMargin/history`
pub const HISTORY: &str = "history";

/// Join a host and an entry point with a single slash
pub fn rest_endpoint(host: &str, entry_point: &str) -> String {
    format!(
        "{}/{}",
        host.trim_end_matches('/'),
        entry_point.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_endpoint_joins_once() {
        assert_eq!(
            rest_endpoint(REST_HOST, ENTRY_POINT_ORDER),
            "dapi.binance.com/dapi/v1/order"
        );
        assert_eq!(rest_endpoint("host/", "/dapi/v1/depth"), "host/dapi/v1/depth");
    }

    #[test]
    fn test_history_suffix() {
        assert_eq!(
            rest_endpoint(ENTRY_POINT_POSITION_MARGIN, HISTORY),
            "dapi/v1/positionMargin/history"
        );
    }
}
