//! Topic dispatch from raw transport messages to node handlers.

use tracing::warn;

use crate::codec::Decode;
use crate::nodes::{Node, NodeError, Publication, Route, Routes};

/// Owns a node and feeds it decoded events, one at a time.
///
/// The route table is resolved once from [`Node::routes`] at construction.
/// Handlers receive `&mut` access to the node, so no two of them ever run
/// concurrently.
pub struct Router<N: Node> {
    node: N,
    routes: Routes,
}

impl<N: Node> Router<N> {
    pub fn new(node: N) -> Self {
        let routes = node.routes();
        Self { node, routes }
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    /// Decodes one message and runs the handler its topic is bound to.
    ///
    /// Messages on topics outside the route table are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`NodeError`] if the payload does not decode or the node
    /// rejects it.
    pub fn dispatch(&mut self, topic: &str, payload: &[u8]) -> Result<Vec<Publication>, NodeError> {
        let decode_error = |source| NodeError::Decode {
            topic: topic.to_owned(),
            source,
        };

        match self.routes.resolve(topic) {
            Some(Route::Tick) => {
                let tick = N::Tick::decode(payload).map_err(decode_error)?;
                self.node.on_tick(&tick)
            }
            Some(Route::Control) => {
                let update = N::Control::decode(payload).map_err(decode_error)?;
                self.node.on_control(update)?;
                Ok(Vec::new())
            }
            None => {
                warn!(topic, node = self.node.node_type(), "ignoring unrouted topic");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DecodeError;
    use crate::nodes::AveragingNode;

    #[test]
    fn routes_measurements_to_tick_handler() {
        let mut router = Router::new(AveragingNode::new("1"));
        let out = router
            .dispatch("chaossensor/1/data", br#"{"payload": 3.0, "timestamp": "t"}"#)
            .expect("valid measurement");
        assert_eq!(out.len(), 1);
        assert_eq!(router.node().buffer().len(), 1);
    }

    #[test]
    fn unknown_topics_are_ignored() {
        let mut router = Router::new(AveragingNode::new("1"));
        let out = router
            .dispatch("chaossensor/2/data", b"not even json")
            .expect("ignored");
        assert!(out.is_empty());
        assert!(router.node().buffer().is_empty());
    }

    #[test]
    fn malformed_payload_names_topic() {
        let mut router = Router::new(AveragingNode::new("1"));
        match router.dispatch("chaossensor/1/data", br#"{"payload": "x"}"#) {
            Err(NodeError::Decode { topic, source }) => {
                assert_eq!(topic, "chaossensor/1/data");
                assert!(matches!(source, DecodeError::Json(_)));
            }
            other => panic!("expected decode error, got {other:?}"),
        }
        assert!(router.node().buffer().is_empty());
    }
}
