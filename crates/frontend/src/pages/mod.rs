pub mod shelter_map;
