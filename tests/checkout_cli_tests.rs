use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn checkout() -> Command {
    let mut cmd = Command::new(cargo_bin!("guard-checkout"));
    cmd.args([
        "checkout",
        "--email",
        "client@example.com",
        "--quote-delay-ms",
        "0",
        "--public-key",
        "pk_test_local",
    ]);
    cmd
}

#[test]
fn test_checkout_approved() {
    checkout()
        .args(["--outcome", "approve"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Amount: 1200 ZAR"))
        .stdout(predicate::str::contains("Payment started:"))
        .stdout(predicate::str::contains(
            "Thank you! Your payment was successful.",
        ));
}

#[test]
fn test_checkout_declined() {
    checkout()
        .args(["--outcome", "decline"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Payment was not completed. Please try again.",
        ));
}

#[test]
fn test_checkout_provider_failure() {
    checkout()
        .args(["--outcome", "fail"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Payment was not completed. Please try again.",
        ));
}

#[test]
fn test_checkout_without_email_never_pays() {
    let mut cmd = Command::new(cargo_bin!("guard-checkout"));
    cmd.args(["checkout", "--quote-delay-ms", "0"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Please enter a valid email address to proceed.",
        ))
        .stdout(predicate::str::contains("Payment started").not());
}

#[test]
fn test_checkout_currency_from_env() {
    checkout()
        .env("CHECKOUT_CURRENCY", "USD")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Amount: 1200 USD"));
}
