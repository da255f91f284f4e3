mod test_join_leave_order;
mod test_unknown_event_is_reported;
