pub mod config;
pub mod error;
pub mod graph;
pub mod history;
pub mod nodes;
pub mod registry;
pub mod schema;
pub mod topo;
pub mod translator;
pub mod types;
pub mod undo;

pub use config::{HistoryConfig, TranslatorConfig};
pub use error::GraphError;
pub use graph::{Graph, GraphContext, GraphNode};
pub use history::{
    build_histories, ParameterMapHistories, ParameterMapHistory, ParameterMapHistoryBuilder,
    ParameterMapHistorySink,
};
pub use nodes::{MapGetNode, MapInputNode, MapSetNode, map_get::SyncReport};
pub use registry::VariableRegistry;
pub use schema::{
    signature, CompileHash, GraphSchema, NodeSignature, NodeType, ParameterCollection, PortKind,
    TypeTranslator,
};
pub use topo::topo_order;
pub use translator::{
    compile_graph, CompileError, CompiledGraph, CompiledRef, IrChunk, IrEmitter, ReadFallback,
    Translator,
};
pub use types::*;
pub use undo::{NoTransactions, Transactor, UndoStack};
