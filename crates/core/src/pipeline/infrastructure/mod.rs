pub mod interval_driver;
