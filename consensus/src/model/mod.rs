pub mod linked_event;
