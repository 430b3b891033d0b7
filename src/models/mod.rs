pub mod pmt;
