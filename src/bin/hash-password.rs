use bcrypt::{hash, DEFAULT_COST};
use std::env;

fn main() {
    let mut args = env::args().skip(1);
    let (Some(email), Some(password)) = (args.next(), args.next()) else {
        eprintln!("Usage: cargo run --bin hash-password <EMAIL> <PASSWORD>");
        std::process::exit(1);
    };

    match hash(&password, DEFAULT_COST) {
        Ok(hashed) => {
            println!("\nEmail    : {}", email);
            println!("Cost     : {}", DEFAULT_COST);
            println!("Hash     : {}\n", hashed);
            println!("# Without a database, paste this into your .env:");
            println!("ADMIN_EMAIL={}", email);
            println!("ADMIN_HASH_PASSWORD={}\n", hashed);
            println!("# With a database, create the admin row:");
            println!(
                "INSERT INTO admin (email, password_hash, role) VALUES ('{}', '{}', 'admin');",
                email.replace('\'', "''"),
                hashed
            );
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
