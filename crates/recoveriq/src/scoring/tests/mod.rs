mod calculator;
mod common;
