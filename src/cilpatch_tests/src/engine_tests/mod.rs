mod field_plug_tests;
mod property_plug_tests;
