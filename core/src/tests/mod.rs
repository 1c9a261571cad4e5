mod dual_map;
mod partial_failure;
mod payload_fields;
