pub mod bus;
pub mod device;
pub mod io;
pub mod machine;
pub mod peripheral;
pub mod rom;
pub mod switches_cfg;
pub mod sys;
