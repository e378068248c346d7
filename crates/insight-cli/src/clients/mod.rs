pub mod lichess;
