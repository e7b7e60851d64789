//! # Demo Data Seeder
//!
//! Fills a fresh database with a grocery catalog and a few customer
//! accounts so the terminal has something to scan.
//!
//! ## Usage
//! ```bash
//! cargo run -p till-db --bin seed
//! cargo run -p till-db --bin seed -- --count 500 --db ./data/till.db
//! ```
//!
//! Barcodes are `8964` + a 9-digit sequence. Prices run 50.00 to 1,249.00,
//! stock 0 to 60, and every fifth product sits under its low-stock
//! threshold.

use std::env;

use till_core::{CustomerType, Money, NewCustomer, NewProduct};
use till_db::{Database, DbConfig};

const AISLES: &[(&str, &[&str])] = &[
    (
        "Dairy",
        &[
            "Olpers Milk",
            "Nestle Milkpak",
            "Haleeb Milk",
            "Adams Cheddar",
            "Nurpur Butter",
            "Dahi",
            "Lassi",
        ],
    ),
    (
        "Beverages",
        &[
            "Coca-Cola",
            "Pepsi",
            "7Up",
            "Sprite",
            "Nestle Water",
            "Aquafina",
            "Rooh Afza",
            "Tang Orange",
        ],
    ),
    (
        "Pantry",
        &[
            "Tapal Danedar",
            "Lipton Yellow Label",
            "Dalda Cooking Oil",
            "Basmati Rice",
            "Chakki Atta",
            "Shan Biryani Masala",
            "National Salt",
            "Sugar",
            "Daal Chana",
        ],
    ),
    (
        "Snacks",
        &[
            "Lays Masala",
            "Kurkure",
            "Peek Freans Sooper",
            "LU Prince",
            "Candi Biscuit",
            "Slanty",
        ],
    ),
    (
        "Household",
        &[
            "Surf Excel",
            "Ariel",
            "Lifebuoy Soap",
            "Safeguard Soap",
            "Harpic",
            "Colgate",
        ],
    ),
];

const PACK_SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Regular", 4_000),
    ("Family", 12_000),
    ("Bulk", 30_000),
];

const CUSTOMERS: &[(&str, Option<&str>, CustomerType, i64)] = &[
    ("Walk-in Regular", None, CustomerType::Regular, 0),
    ("Bilal Ahmed", Some("Ahmed Traders"), CustomerType::Wholesale, 5_000_000),
    ("Sana Malik", None, CustomerType::Vip, 1_000_000),
    ("Usman Sheikh", Some("Sheikh Kiryana Store"), CustomerType::Wholesale, 2_500_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 120;
    let mut db_path = String::from("./till_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if let Some(value) = args.get(i + 1) {
                    count = value.parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    db_path = value.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till POS demo data seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Products to create (default: 120)");
                println!("  -d, --db <PATH>    Database file (default: ./till_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    println!("Seeding {} (up to {} products)", db_path, count);

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("Database already has {} products; nothing to do.", existing);
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut created = 0;

    'outer: for (aisle_idx, (_, names)) in AISLES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, addon)) in PACK_SIZES.iter().enumerate() {
                if created >= count {
                    break 'outer;
                }

                let seq = aisle_idx * 1_000 + name_idx * 10 + size_idx;
                let product = demo_product(name, size, *addon, seq);

                match db.products().insert(&product).await {
                    Ok(_) => created += 1,
                    Err(e) => eprintln!("Skipping {}: {}", product.barcode, e),
                }
            }
        }
    }

    println!("Created {} products in {:?}", created, start.elapsed());

    for (name, company, customer_type, limit_cents) in CUSTOMERS {
        let customer = db
            .customers()
            .insert(&NewCustomer {
                name: name.to_string(),
                company_name: company.map(str::to_string),
                customer_type: *customer_type,
                credit_limit_cents: *limit_cents,
                ..Default::default()
            })
            .await?;

        println!(
            "Customer #{} {} (limit {})",
            customer.id,
            customer.name,
            Money::from_cents(*limit_cents)
        );
    }

    let low = db.products().low_stock().await?;
    println!("{} products start below their threshold", low.len());

    Ok(())
}

fn demo_product(name: &str, size: &str, addon_cents: i64, seq: usize) -> NewProduct {
    let base_cents = 5_000 + ((seq * 37) % 90) as i64 * 1_000;
    let threshold = 5;
    let quantity = if seq % 5 == 0 {
        (seq % threshold) as i64
    } else {
        10 + (seq % 51) as i64
    };

    NewProduct {
        barcode: format!("8964{:09}", seq),
        name: format!("{} {}", name, size),
        sale_price_cents: base_cents + addon_cents,
        quantity,
        min_stock_threshold: threshold as i64,
    }
}
