mod dual_schema_case1;
mod mixed_schema_case2;
