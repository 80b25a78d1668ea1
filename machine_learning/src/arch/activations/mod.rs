mod act_fn;
mod sigmoid;

pub use act_fn::ActFn;
pub use sigmoid::Sigmoid;
