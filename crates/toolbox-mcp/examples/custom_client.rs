//! Example: Custom MCP client in Rust.
//!
//! Spawns the toolbox-mcp server over stdio, negotiates a tools-only
//! session and shows what the capability gate does with the rest.
//!
//! Usage:
//!   cargo run --example custom_client
//!
//! Note: This example requires the server binary to be built first.

use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

use serde_json::{json, Value};

/// Simple MCP client that communicates with the server over stdio.
struct SimpleClient {
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    next_id: i64,
}

impl SimpleClient {
    /// Send a JSON-RPC request and read the response.
    fn request(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let request = json!({
            "jsonrpc": "2.0",
            "id": self.next_id,
            "method": method,
            "params": params
        });

        let line = serde_json::to_string(&request).unwrap() + "\n";
        self.stdin.write_all(line.as_bytes()).unwrap();
        self.stdin.flush().unwrap();

        let mut response_line = String::new();
        self.reader.read_line(&mut response_line).unwrap();
        serde_json::from_str(&response_line).unwrap()
    }

    /// Send a JSON-RPC notification (no response expected).
    fn notify(&mut self, method: &str) {
        let notification = json!({ "jsonrpc": "2.0", "method": method });
        let line = serde_json::to_string(&notification).unwrap() + "\n";
        self.stdin.write_all(line.as_bytes()).unwrap();
        self.stdin.flush().unwrap();
    }
}

fn main() {
    println!("=== Toolbox MCP Client Example ===\n");

    let server_path = std::env::current_dir()
        .unwrap()
        .join("target/debug/toolbox-mcp");

    if !server_path.exists() {
        eprintln!("Server binary not found. Run `cargo build` first.");
        std::process::exit(1);
    }

    let mut child = Command::new(&server_path)
        .arg("serve")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to start server");

    let stdin = child.stdin.take().expect("Failed to open stdin");
    let stdout = child.stdout.take().expect("Failed to open stdout");

    let mut client = SimpleClient {
        stdin,
        reader: BufReader::new(stdout),
        next_id: 0,
    };

    // 1. Initialize, advertising tools only
    println!("1. Initializing...");
    let init_response = client.request(
        "initialize",
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": { "tools": {} },
            "clientInfo": { "name": "example-client", "version": "1.0.0" }
        }),
    );
    let result = &init_response["result"];
    println!(
        "   Server: {} v{}",
        result["serverInfo"]["name"], result["serverInfo"]["version"]
    );
    println!("   Negotiated: {}", result["negotiatedCapabilities"]);

    client.notify("notifications/initialized");

    // 2. List tools
    println!("\n2. Listing tools...");
    let tools_response = client.request("tools/list", json!({}));
    let tools = tools_response["result"]["tools"].as_array().unwrap();
    println!("   Available tools ({}):", tools.len());
    for tool in tools {
        println!("   - {}", tool["name"].as_str().unwrap());
    }

    // 3. Call a tool
    println!("\n3. Calculating...");
    let calc = client.request(
        "tools/call",
        json!({ "name": "calculate", "arguments": { "expression": "(2 + 3) * 4" } }),
    );
    println!("   (2 + 3) * 4 = {}", calc["result"]["content"][0]["text"]);

    // 4. A failing tool is still a result
    println!("\n4. Asking for an impossible random number...");
    let random = client.request(
        "tools/call",
        json!({ "name": "random_number", "arguments": { "min": 10, "max": 5 } }),
    );
    println!(
        "   isError = {}, message = {}",
        random["result"]["isError"], random["result"]["content"][0]["text"]
    );

    // 5. Resources were not negotiated
    println!("\n5. Listing resources without the capability...");
    let resources = client.request("resources/list", json!({}));
    println!(
        "   error {}: {}",
        resources["error"]["code"], resources["error"]["message"]
    );

    // Closing stdin ends the session and the server.
    drop(client);
    let _ = child.wait();

    println!("\n=== Example complete ===");
}
