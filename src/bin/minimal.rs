// Minimal smoke run of the core without any input files

use dog_vision::{
    buffer::PixelBuffer,
    color::{transform, ColorModel},
    still::{self, OutputFormat},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing Dog-Vision core functionality");

    // Test 1: Models
    println!("\n1. Available models...");
    for model in ColorModel::ALL {
        println!("   {} - {}", model, model.description());
    }

    // Test 2: Synthetic frame with a hue sweep and a dark band
    println!("\n2. Building test frame...");
    let (width, height) = (256, 96);
    let mut frame = PixelBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let shade = if y < height / 3 { 255 } else if y < 2 * height / 3 { 128 } else { 40 };
            let r = ((255 - x) * shade / 255) as u8;
            let g = ((x * shade) / 255) as u8;
            let b = ((y * 255 / height) * shade / 255) as u8;
            frame.set_pixel(x, y, [r, g, b, 255]);
        }
    }
    println!("   Created frame: {}x{}", frame.width(), frame.height());

    // Test 3: Apply both models
    println!("\n3. Applying models...");
    for model in ColorModel::ALL {
        let seen = transform(&frame, model)?;
        let center = seen.get_pixel(width / 2, height / 2);
        println!("   {:<12} center pixel {:?}", model.name(), center);

        let path = format!("minimal_{}.png", model.name());
        match std::fs::write(&path, still::encode(&seen, OutputFormat::Png)?) {
            Ok(()) => println!("   Output saved to: {}", path),
            Err(e) => println!("   Could not save file: {}", e),
        }
    }

    // Test 4: Known reference pixel
    println!("\n4. Checking reference pixel...");
    let red = PixelBuffer::from_raw(1, 1, vec![255, 0, 0, 255])?;
    let seen = transform(&red, ColorModel::Dichromatic)?;
    println!("   Pure red under dichromatic: {:?}", seen.as_bytes());

    println!("\nDog-Vision core is working.");
    Ok(())
}
