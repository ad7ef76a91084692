use crate::core::errors::ExchangeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateTrade {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "a")]
    pub aggregate_trade_id: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "q")]
    pub quantity: String,
    #[serde(rename = "f")]
    pub first_trade_id: i64,
    #[serde(rename = "l")]
    pub last_trade_id: i64,
    #[serde(rename = "T")]
    pub trade_time: i64,
    #[serde(rename = "m")]
    pub buyer_is_maker: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkPrice {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "p")]
    pub mark_price: String,
    #[serde(rename = "P")]
    pub estimated_settle_price: String,
    #[serde(rename = "r")]
    pub funding_rate: String,
    #[serde(rename = "T")]
    pub next_funding_time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexPrice {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "i")]
    pub pair: String,
    #[serde(rename = "p")]
    pub index_price: String,
}

/// Candle body shared by symbol and continuous-contract klines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Candlestick {
    #[serde(rename = "t")]
    pub start_time: i64,
    #[serde(rename = "T")]
    pub close_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "i")]
    pub interval: String,
    #[serde(rename = "f")]
    pub first_trade_id: i64,
    #[serde(rename = "L")]
    pub last_trade_id: i64,
    #[serde(rename = "o")]
    pub open: String,
    #[serde(rename = "c")]
    pub close: String,
    #[serde(rename = "h")]
    pub high: String,
    #[serde(rename = "l")]
    pub low: String,
    #[serde(rename = "v")]
    pub volume: String,
    #[serde(rename = "n")]
    pub number_of_trades: i64,
    #[serde(rename = "x")]
    pub is_closed: bool,
    #[serde(rename = "q")]
    pub base_asset_volume: String,
    #[serde(rename = "V")]
    pub taker_buy_volume: String,
    #[serde(rename = "Q")]
    pub taker_buy_base_asset_volume: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kline {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "k")]
    pub candle: Candlestick,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuousKline {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "ps")]
    pub pair: String,
    #[serde(rename = "ct")]
    pub contract_type: String,
    #[serde(rename = "k")]
    pub candle: Candlestick,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidatedOrder {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "ps")]
    pub pair: String,
    #[serde(rename = "S")]
    pub side: String,
    #[serde(rename = "o")]
    pub order_type: String,
    #[serde(rename = "f")]
    pub time_in_force: String,
    #[serde(rename = "q")]
    pub original_quantity: String,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "ap")]
    pub average_price: String,
    #[serde(rename = "X")]
    pub status: String,
    #[serde(rename = "l")]
    pub last_filled_quantity: String,
    #[serde(rename = "z")]
    pub accumulated_quantity: String,
    #[serde(rename = "T")]
    pub trade_time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Liquidation {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "o")]
    pub order: LiquidatedOrder,
}

/// `[price, quantity]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel(pub String, pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookDepth {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "T")]
    pub transaction_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "ps")]
    pub pair: String,
    #[serde(rename = "U")]
    pub first_update_id: i64,
    #[serde(rename = "u")]
    pub final_update_id: i64,
    #[serde(rename = "pu")]
    pub previous_final_update_id: i64,
    #[serde(rename = "b")]
    pub bids: Vec<PriceLevel>,
    #[serde(rename = "a")]
    pub asks: Vec<PriceLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiniTicker {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "ps")]
    pub pair: String,
    #[serde(rename = "o")]
    pub open: String,
    #[serde(rename = "c")]
    pub close: String,
    #[serde(rename = "h")]
    pub high: String,
    #[serde(rename = "l")]
    pub low: String,
    #[serde(rename = "v")]
    pub volume: String,
    #[serde(rename = "q")]
    pub base_asset_volume: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ticker {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "ps")]
    pub pair: String,
    #[serde(rename = "p")]
    pub price_change: String,
    #[serde(rename = "P")]
    pub price_change_percent: String,
    #[serde(rename = "w")]
    pub weighted_average_price: String,
    #[serde(rename = "c")]
    pub last_price: String,
    #[serde(rename = "Q")]
    pub last_quantity: String,
    #[serde(rename = "o")]
    pub open: String,
    #[serde(rename = "h")]
    pub high: String,
    #[serde(rename = "l")]
    pub low: String,
    #[serde(rename = "v")]
    pub volume: String,
    #[serde(rename = "q")]
    pub base_asset_volume: String,
    #[serde(rename = "O")]
    pub open_time: i64,
    #[serde(rename = "C")]
    pub close_time: i64,
    #[serde(rename = "F")]
    pub first_trade_id: i64,
    #[serde(rename = "L")]
    pub last_trade_id: i64,
    #[serde(rename = "n")]
    pub trade_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookTicker {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "u")]
    pub update_id: i64,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "T")]
    pub transaction_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "ps")]
    pub pair: String,
    #[serde(rename = "b")]
    pub best_bid_price: String,
    #[serde(rename = "B")]
    pub best_bid_quantity: String,
    #[serde(rename = "a")]
    pub best_ask_price: String,
    #[serde(rename = "A")]
    pub best_ask_quantity: String,
}

/// A decoded market-stream frame
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    AggregateTrade(AggregateTrade),
    MarkPrice(MarkPrice),
    IndexPrice(IndexPrice),
    Kline(Kline),
    ContinuousKline(ContinuousKline),
    Liquidation(Liquidation),
    BookDepth(BookDepth),
    MiniTicker(MiniTicker),
    Ticker(Ticker),
    BookTicker(BookTicker),
    /// Anything without a known `e` tag, including subscribe replies
    Unknown(Value),
}

impl StreamEvent {
    /// Decode one frame, unwrapping the combined-stream `{"stream", "data"}` envelope
    pub fn decode(frame: &[u8]) -> Result<Self, ExchangeError> {
        let mut value: Value = serde_json::from_slice(frame)?;

        if value.get("stream").is_some() {
            if let Some(data) = value.get_mut("data").map(Value::take) {
                value = data;
            }
        }

        let event_type = match value.get("e").and_then(Value::as_str) {
            Some(event_type) => event_type.to_string(),
            None => return Ok(Self::Unknown(value)),
        };

        let event = match event_type.as_str() {
            "aggTrade" => Self::AggregateTrade(from_value(value)?),
            "markPriceUpdate" => Self::MarkPrice(from_value(value)?),
            "indexPriceUpdate" => Self::IndexPrice(from_value(value)?),
            "kline" => Self::Kline(from_value(value)?),
            "continuous_kline" => Self::ContinuousKline(from_value(value)?),
            "forceOrder" => Self::Liquidation(from_value(value)?),
            "depthUpdate" => Self::BookDepth(from_value(value)?),
            "24hrMiniTicker" => Self::MiniTicker(from_value(value)?),
            "24hrTicker" => Self::Ticker(from_value(value)?),
            "bookTicker" => Self::BookTicker(from_value(value)?),
            _ => Self::Unknown(value),
        };
        Ok(event)
    }
}

fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ExchangeError> {
    serde_json::from_value(value)
        .map_err(|e| ExchangeError::DeserializationError(format!("Failed to parse event: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_aggregate_trade() {
        let frame = br#"{"e":"aggTrade","E":1591261134288,"a":424951,"s":"BTCUSD_200626","p":"9643.5","q":"2","f":606073,"l":606073,"T":1591261134199,"m":false}"#;
        match StreamEvent::decode(frame).unwrap() {
            StreamEvent::AggregateTrade(trade) => {
                assert_eq!(trade.symbol, "BTCUSD_200626");
                assert_eq!(trade.price, "9643.5");
                assert_eq!(trade.quantity, "2");
                assert_eq!(trade.aggregate_trade_id, 424_951);
                assert!(!trade.buyer_is_maker);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_combined_stream_envelope() {
        let frame = br#"{"stream":"btcusd_perp@markPrice","data":{"e":"markPriceUpdate","E":1596095725000,"s":"BTCUSD_PERP","p":"11185.87786614","P":"11192.5","r":"0.00030000","T":1596096000000}}"#;
        match StreamEvent::decode(frame).unwrap() {
            StreamEvent::MarkPrice(mark) => {
                assert_eq!(mark.symbol, "BTCUSD_PERP");
                assert_eq!(mark.funding_rate, "0.00030000");
                assert_eq!(mark.next_funding_time, 1_596_096_000_000);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_depth_levels() {
        let frame = br#"{"e":"depthUpdate","E":1591269996801,"T":1591269996646,"s":"BTCUSD_200626","ps":"BTCUSD","U":17276694,"u":17276701,"pu":17276678,"b":[["9523.0","5"]],"a":[["9524.6","9"],["9525.0","1"]]}"#;
        match StreamEvent::decode(frame).unwrap() {
            StreamEvent::BookDepth(depth) => {
                assert_eq!(depth.bids, vec![PriceLevel("9523.0".into(), "5".into())]);
                assert_eq!(depth.asks.len(), 2);
                assert_eq!(depth.previous_final_update_id, 17_276_678);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_kline_and_liquidation() {
        let kline = br#"{"e":"kline","E":1591261542539,"s":"BTCUSD_200626","k":{"t":1591261500000,"T":1591261559999,"s":"BTCUSD_200626","i":"1m","o":"9638.9","c":"9639.8","h":"9639.8","l":"9638.6","v":"156","n":47,"x":false}}"#;
        assert!(matches!(
            StreamEvent::decode(kline).unwrap(),
            StreamEvent::Kline(k) if k.candle.interval == "1m" && k.candle.number_of_trades == 47
        ));

        let liquidation = br#"{"e":"forceOrder","E":1591154240950,"o":{"s":"BTCUSD_200925","ps":"BTCUSD","S":"SELL","o":"LIMIT","f":"IOC","q":"1","p":"9425.5","ap":"9496.5","X":"FILLED","l":"1","z":"1","T":1591154240949}}"#;
        assert!(matches!(
            StreamEvent::decode(liquidation).unwrap(),
            StreamEvent::Liquidation(l) if l.order.side == "SELL" && l.order.trade_time == 1_591_154_240_949
        ));
    }

    #[test]
    fn test_subscribe_reply_is_unknown() {
        let event = StreamEvent::decode(br#"{"result":null,"id":1699999999}"#).unwrap();
        assert!(matches!(event, StreamEvent::Unknown(v) if v["id"] == 1_699_999_999));
    }

    #[test]
    fn test_unrecognized_event_type_is_unknown() {
        let event = StreamEvent::decode(br#"{"e":"somethingNew","E":1}"#).unwrap();
        assert!(matches!(event, StreamEvent::Unknown(_)));
    }

    #[test]
    fn test_malformed_frame_is_an_error() {
        assert!(matches!(
            StreamEvent::decode(b"not json"),
            Err(ExchangeError::JsonError(_))
        ));
        assert!(matches!(
            StreamEvent::decode(br#"{"e":"aggTrade","p":42}"#),
            Err(ExchangeError::DeserializationError(_))
        ));
    }
}
