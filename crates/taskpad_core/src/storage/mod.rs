pub mod presence_store;
