//! MCP capability negotiation during initialization.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::types::{
    ClientCapabilities, NegotiatedCapabilities, ServerCapabilities, MCP_VERSION,
    SUPPORTED_PROTOCOL_VERSIONS,
};

/// Compute the capability set active for a session.
///
/// `tools`, `resources`, `prompts` and `logging` need both sides.
/// `sampling` follows the client alone. Experimental flags are intersected
/// key by key. Missing entries mean "not advertised"; this never fails.
pub fn negotiate(server: &ServerCapabilities, client: &ClientCapabilities) -> NegotiatedCapabilities {
    NegotiatedCapabilities {
        tools: server.tools.is_some() && advertised(client.tools.as_ref()),
        resources: server.resources.is_some() && advertised(client.resources.as_ref()),
        prompts: server.prompts.is_some() && advertised(client.prompts.as_ref()),
        logging: server.logging.is_some() && advertised(client.logging.as_ref()),
        sampling: advertised(client.sampling.as_ref()),
        experimental: negotiate_experimental(
            server.experimental.as_ref(),
            client.experimental.as_ref(),
        ),
    }
}

/// Pick the protocol version for a session.
///
/// A supported client version is echoed back; anything else falls back to
/// the server's preferred version.
pub fn agree_protocol_version(requested: &str) -> String {
    if SUPPORTED_PROTOCOL_VERSIONS.contains(&requested) {
        return requested.to_string();
    }

    tracing::warn!(
        "Client requested protocol version {:?}, server supports {:?}. Proceeding with {}.",
        requested,
        SUPPORTED_PROTOCOL_VERSIONS,
        MCP_VERSION
    );
    MCP_VERSION.to_string()
}

fn negotiate_experimental(
    server: Option<&BTreeMap<String, Value>>,
    client: Option<&BTreeMap<String, Value>>,
) -> BTreeMap<String, bool> {
    let empty = BTreeMap::new();
    let server = server.unwrap_or(&empty);
    let client = client.unwrap_or(&empty);

    server
        .keys()
        .chain(client.keys())
        .map(|key| {
            let both = advertised(server.get(key)) && advertised(client.get(key));
            (key.clone(), both)
        })
        .collect()
}

/// `null` and `false` count as absent.
fn advertised(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null) | Some(Value::Bool(false)))
}
