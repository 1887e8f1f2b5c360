// Bank Management - CLI demo walkthrough
// Seeds the default dataset and runs a few sample operations against the
// configured store. The REST API lives in the bank-server binary.

use anyhow::Result;

use bank_management::{
    credit_interest, deposit, ensure_seed_accounts, list_accounts, simulate_interest, withdraw,
    Config, Identity, Role,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("🏦 Bank Management - Demo Walkthrough");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::from_env();
    let store = open_store_or_exit(&config);

    if ensure_seed_accounts(store.as_ref())? {
        println!("☁️  Seeded default accounts (Tom, Jim)");
    }

    // The demo acts as the administrator; the server verifies real tokens.
    let admin = Identity {
        username: "admin".to_string(),
        role: Role::Admin,
    };

    println!("\n💰 Deposit 100 EUR for Tom...");
    report(deposit(store.as_ref(), &admin, "Tom", 100.0).map(|r| r.message));

    println!("\n💸 Withdraw 100 EUR from Jim...");
    report(withdraw(store.as_ref(), &admin, "Jim", 100.0).map(|r| r.message));

    println!("\n📈 Credit interest for Jim...");
    report(credit_interest(store.as_ref(), &admin, "Jim").map(|r| r.message));

    println!("\n📈 Credit interest for Tom (expected to fail)...");
    report(credit_interest(store.as_ref(), &admin, "Tom").map(|r| r.message));

    println!("\n🔮 Simulate 5% interest for Jim (no permanent change)...");
    report(simulate_interest(store.as_ref(), "Jim", 5.0));

    println!("\n📋 Final account list:");
    for account in list_accounts(store.as_ref())? {
        println!("   {account}");
    }

    println!("\n✅ Demo complete");
    Ok(())
}

fn open_store_or_exit(config: &Config) -> Box<dyn bank_management::AccountStore> {
    match bank_management::open_store(config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("❌ Could not open the account store: {e}");
            eprintln!("   Check STORAGE_TYPE / JSON_FILE / DB_FILE.");
            std::process::exit(1);
        }
    }
}

fn report(result: Result<String, bank_management::BankError>) {
    match result {
        Ok(message) => println!("✓ {message}"),
        Err(e) => println!("⚠️  {e}"),
    }
}
