pub mod mapper;
pub mod output_type;
pub mod replay;
pub mod results;
pub mod runtime;
pub mod statement;

pub use mapper::{infer_type, MappedResult, ResultMapper};
pub use output_type::{FunctionRef, OutputType};
pub use replay::ReplayAppFactory;
pub use results::{DialogueHistoryResultItem, DialogueHistoryResultList, RawResult, MORE_SIZE, PAGE_SIZE};
pub use runtime::{App, AppFactory, AppOutput, ExecutionError};
pub use statement::StatementExecutor;
