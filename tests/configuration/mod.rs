mod contexts_case1;
