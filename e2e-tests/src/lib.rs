//! Cross-service end-to-end tests live under tests/.
