// Tool registry, dispatch protocol and stdio server for the study assistant tools

pub mod dispatch;
pub mod protocol;
pub mod server;
pub mod tools;

pub use dispatch::Dispatcher;
pub use server::McpServer;
