pub mod machine_learning;
pub mod worker;
