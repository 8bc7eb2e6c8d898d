//! Integration tests against a mocked deployment API

mod test_registration;
