pub mod job;
pub mod ledger;
pub mod lock;
pub mod log;
pub mod run;
pub mod settle;
pub mod store;
pub mod tariff;
pub mod window;
