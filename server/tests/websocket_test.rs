//! Unit tests for the WebSocket protocol wire format.

use serde_json::json;
use stockroom_engine::{CartLine, Order, OrderStatus, Product, Variant};

/// Mirror of the messages a client may send.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[allow(dead_code)]
enum ClientMessage {
    Add {
        product_id: String,
        flavor: String,
        #[serde(default)]
        quantity: Option<u32>,
        #[serde(default)]
        request_id: Option<String>,
    },
    Remove {
        product_id: String,
        #[serde(default)]
        flavor: Option<String>,
        #[serde(default)]
        request_id: Option<String>,
    },
    Clear {
        #[serde(default)]
        request_id: Option<String>,
    },
    Cart {
        #[serde(default)]
        request_id: Option<String>,
    },
    Checkout {
        #[serde(default)]
        request_id: Option<String>,
    },
    Ping,
}

/// Mirror of the server's order message.
#[derive(Debug, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    Order {
        order: Order,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    Notice {
        text: String,
    },
    Answer {
        request_id: String,
        text: String,
    },
}

fn order() -> Order {
    let product = Product::new("pod-1", "Pod", 1500, "pods", vec![Variant::new("Mint", 2)]);
    Order {
        id: "order-1".into(),
        customer_id: 42,
        items: vec![CartLine::for_product(&product, "Mint", 2)],
        status: OrderStatus::Pending,
        created_at: 1706745600000,
    }
}

#[cfg(test)]
mod websocket_protocol_tests {
    use super::*;

    #[test]
    fn test_client_message_add_deserialization() {
        let json = r#"{
            "type": "add",
            "product_id": "pod-1",
            "flavor": "Mint",
            "quantity": 2,
            "request_id": "req-001"
        }"#;

        let msg: ClientMessage = serde_json::from_str(json).unwrap();

        match msg {
            ClientMessage::Add {
                product_id,
                flavor,
                quantity,
                request_id,
            } => {
                assert_eq!(product_id, "pod-1");
                assert_eq!(flavor, "Mint");
                assert_eq!(quantity, Some(2));
                assert_eq!(request_id, Some("req-001".to_string()));
            }
            _ => panic!("Expected Add message"),
        }
    }

    #[test]
    fn test_client_message_remove_without_flavor() {
        let json = r#"{"type": "remove", "product_id": "pod-1"}"#;

        let msg: ClientMessage = serde_json::from_str(json).unwrap();

        match msg {
            ClientMessage::Remove {
                flavor, request_id, ..
            } => {
                assert!(flavor.is_none());
                assert!(request_id.is_none());
            }
            _ => panic!("Expected Remove message"),
        }
    }

    #[test]
    fn test_client_message_unit_variants() {
        for (json, expected) in [
            (r#"{"type": "clear"}"#, "clear"),
            (r#"{"type": "cart", "request_id": "r"}"#, "cart"),
            (r#"{"type": "checkout"}"#, "checkout"),
            (r#"{"type": "ping"}"#, "ping"),
        ] {
            let msg: ClientMessage = serde_json::from_str(json).unwrap();
            let name = match msg {
                ClientMessage::Clear { .. } => "clear",
                ClientMessage::Cart { .. } => "cart",
                ClientMessage::Checkout { .. } => "checkout",
                ClientMessage::Ping => "ping",
                _ => "other",
            };
            assert_eq!(name, expected);
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<ClientMessage, _> = serde_json::from_str(r#"{"type": "restock"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_order_message_serialization() {
        let msg = ServerMessage::Order {
            order: order(),
            request_id: Some("req-002".into()),
        };

        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["type"], "order");
        assert_eq!(value["request_id"], "req-002");
        assert_eq!(value["order"]["id"], "order-1");
        assert_eq!(value["order"]["user_id"], 42);
        assert_eq!(value["order"]["status"], "pending");
        assert_eq!(value["order"]["items"][0]["quantity"], 2);
    }

    #[test]
    fn test_notice_and_answer_serialization() {
        let notice = serde_json::to_value(ServerMessage::Notice {
            text: "Mint added to your cart.".into(),
        })
        .unwrap();
        assert_eq!(
            notice,
            json!({"type": "notice", "text": "Mint added to your cart."})
        );

        let answer = serde_json::to_value(ServerMessage::Answer {
            request_id: "req-003".into(),
            text: "Not enough Mint left in stock.".into(),
        })
        .unwrap();
        assert_eq!(answer["type"], "answer");
        assert_eq!(answer["request_id"], "req-003");
    }
}
