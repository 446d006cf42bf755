pub mod green_spaces;
