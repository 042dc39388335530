/// Renders an amount as whole rupees with Indian digit grouping, e.g.
/// `₹12,34,568`. Halves round away from zero. Any negative amount keeps its
/// sign, so `-0.4` renders `-₹0` like the browser's `en-IN` currency format.
pub fn format_inr(amount: f64) -> String {
    if amount.is_nan() {
        return "₹NaN".to_string();
    }
    if amount.is_infinite() {
        let sign = if amount < 0.0 { "-" } else { "" };
        return format!("{sign}₹∞");
    }

    let rounded = amount.round();
    let sign = if amount.is_sign_negative() { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());
    format!("{sign}₹{}", group_indian(&digits))
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::with_capacity(head.len() / 2 + 2);
    let lead = head.len() % 2;
    if lead > 0 {
        groups.push(&head[..lead]);
    }
    groups.extend(
        head.as_bytes()[lead..]
            .chunks(2)
            .filter_map(|pair| std::str::from_utf8(pair).ok()),
    );
    groups.push(last_three);
    groups.join(",")
}
