pub mod console;
pub mod cookies;
pub mod engine;
pub mod headers;
pub mod patterns;
pub mod policy;
pub mod report;
pub mod sink;
pub mod storage;

pub use console::{ConsoleInterceptor, LeakListener, TracingLeakListener};
pub use engine::AuditEngine;
pub use patterns::PatternSet;
pub use policy::PolicyTable;
pub use report::render_markdown;
pub use sink::IssueSink;
