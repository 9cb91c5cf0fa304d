/// * Greatest common divisor, Euclid's way.
/// * `gcd(0, n)` is `n`, so `gcd(0, 0)` is `0`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// * Least common multiple. Either argument being zero yields zero.
pub fn lcm(a: u64, b: u64) -> u64 {
    if a == 0 || b == 0 {
        return 0;
    }
    a / gcd(a, b) * b
}
