pub mod controls;
pub mod distribution;
pub mod multi_select;
pub mod ordertable;
pub mod summary;
pub mod text_input;
