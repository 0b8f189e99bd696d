//! Tavily web search tool for chatgraph.
//!
//! [`TavilySearchTool`] implements [`Tool`](chatgraph_core::Tool) on top of
//! the [Tavily API](https://tavily.com/).
//!
//! ```rust,no_run
//! use chatgraph_tavily::{TavilySearchTool, TavilyConfig};
//! use chatgraph_core::Tool;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TavilyConfig::new("your-api-key").with_max_results(2);
//! let tool = TavilySearchTool::new(config);
//!
//! let result = tool.call(json!({"query": "weather in singapore"})).await?;
//! println!("{}", result);
//! # Ok(())
//! # }
//! ```

mod search;

pub use search::{parse_search_response, TavilyConfig, TavilySearchTool};

pub use chatgraph_core::Tool;
