pub fn run() {
    println!("Available commands:");
    println!();
    println!("  -version          Show version information");
    println!("  -help             Show this help message");
    println!("  -search <QUERY> --session <FILE>");
    println!("                    Search every tab of a saved session");
    println!("      --case-sensitive  Match case exactly");
    println!("      --whole-word      Only match whole words");
    println!("      --regex           Treat the query as a regular expression");
    println!("      --exclude-closed  Leave closed tabs out of the results");
    println!("  -show-config      Display current configuration");
    println!("  -validate-config  Validate configuration file");
}
