pub mod unique_linked_hash_map;
