mod watch_case1;
