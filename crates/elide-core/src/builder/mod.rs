/*! Fluent API for constructing IR programmatically.
 *
 * Hand-wiring node arenas and block lists is tedious and error-prone. These builders hand out
 * value and node ids, keep instruction order, and collect construction errors until `build`.
 */

pub mod block_builder;
pub mod method_builder;
pub mod module_builder;

pub use block_builder::{BlockBuilder, BuiltValue};
pub use method_builder::MethodBuilder;
pub use module_builder::ModuleBuilder;
