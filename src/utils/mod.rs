mod macro_for_unit_test;
