pub mod activity_poll;
