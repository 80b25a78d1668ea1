pub mod batches;
pub mod record;

pub use batches::Batches;
pub use record::ExampleRecord;
