//! Print an Argon2id hash for a registry entry.
//!
//! Usage: `qspool-hash-password <password>` or pipe the password on stdin.

use std::io::BufRead;

use qspool_api::auth::password::hash_password;

fn main() {
    let password = match std::env::args().nth(1) {
        Some(arg) => arg,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .expect("Failed to read password from stdin");
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        eprintln!("usage: qspool-hash-password <password>");
        std::process::exit(2);
    }

    let hash = hash_password(&password).expect("Failed to hash password");
    println!("{hash}");
}
