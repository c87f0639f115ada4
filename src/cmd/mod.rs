/*!
Command dispatcher module: declarations + re-exports only.

  src/cmd/
    mod.rs     (this file)
    serve.rs   (ServeArgs + execute_serve, default command)
    tools.rs   (ToolsArgs + execute_tools)
    call.rs    (CallArgs  + execute_call)
    check.rs   (CheckArgs + execute_check)
    shared.rs  (runtime, parameter parsing, child MCP helpers)

Each subcommand module exposes one public `execute_*` function taking its
args and the resolved `Settings`, returning `anyhow::Result<()>`.
*/

pub mod call;
pub mod check;
pub mod serve;
pub mod shared;
pub mod tools;

pub use call::{CallArgs, execute_call};
pub use check::{CheckArgs, execute_check};
pub use serve::{ServeArgs, execute_serve};
pub use tools::{ToolsArgs, execute_tools};
