mod common;
mod evaluation;
mod forms;
mod staff;
